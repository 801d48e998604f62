pub mod a001_analysis_session;
pub mod a002_conversation;
pub mod a003_artifact;
