pub mod a002_conversation;
pub mod a003_artifact;
