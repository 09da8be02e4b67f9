/*============================================================
  Synavera Project: Explain
  Module: explain_core::render
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Symbolic renderers that turn call arguments and returned
    payloads into text.

  Security / Safety Notes:
    Every pointer is probed before it is read; renderers never
    fail and never dereference unreadable memory.

  Dependencies:
    parse_bits tables, probe, string_buffer.

  Operational Scope:
    System-call echoes and returned-data descriptions.

  Revision History:
    2026-10-18 COD  Grouped renderers by argument family.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unknown values fall back to numbers, never to silence
============================================================*/

pub mod fildes;
pub mod file_type;
pub mod memory;
pub mod mode;
pub mod open_flags;
pub mod pointer;
pub mod process;
pub mod socket;
pub mod termios;
pub mod time;
