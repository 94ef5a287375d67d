// ============================================================================
// Pipeline - change-log batch to channel claim events
// ============================================================================

pub mod cdc_processor;

pub use cdc_processor::{ChangeCaptureProcessor, InvocationSummary, PipelineError, RecordError};
