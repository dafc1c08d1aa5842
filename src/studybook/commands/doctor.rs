use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::DataStore;

pub fn run<S: DataStore>(store: &mut S) -> Result<CmdResult> {
    let report = store.doctor()?;
    let mut result = CmdResult::default();

    if report.is_clean() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
        return Ok(result);
    }

    result.add_message(CmdMessage::warning("Inconsistencies found and fixed:"));
    if report.reattached_orphans > 0 {
        result.add_message(CmdMessage::info(format!(
            "  - Moved {} note(s) with a missing parent to the top level.",
            report.reattached_orphans
        )));
    }
    if report.broken_cycles > 0 {
        result.add_message(CmdMessage::info(format!(
            "  - Broke {} parent cycle(s) by moving a note to the top level.",
            report.broken_cycles
        )));
    }
    if report.cleared_subject_refs > 0 {
        result.add_message(CmdMessage::info(format!(
            "  - Cleared the subject of {} mistake(s) whose subject no longer exists.",
            report.cleared_subject_refs
        )));
    }

    Ok(result)
}
