/*
 * Architecture backends for the context-transfer primitive.
 *
 * Only the machine-dependent minimum lives here: the saved register set,
 * the save/restore pair, and the synthesis of a first-run stack frame.
 * Everything above this module is platform-independent.
 */

#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(target_arch = "x86_64")]
pub(crate) use x86_64::{MachineContext, entry_context, machine_restore, machine_save};
