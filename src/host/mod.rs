// ============================================================================
// Invocation Hosts
// ============================================================================
//
// The pipeline runs once per change-log batch and never retries on its own.
// A host decides how batches arrive and what happens on failure:
// - http: batches are POSTed; a 500 tells the caller to re-deliver
// - replay: a batch is read from disk and re-run with backoff
//
// ============================================================================

pub mod http;
pub mod replay;

pub use http::{configure, start_server, HostState};
pub use replay::replay_file;
