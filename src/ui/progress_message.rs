use crate::FailureKind;
use crate::record::RecordKind;

/// Sent from ingest workers to the progress display
#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Committed(RecordKind),
    Dropped {
        line: usize,
        kind: FailureKind,
    },
    Exit,
}
