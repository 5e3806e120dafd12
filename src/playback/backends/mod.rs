pub mod command;

pub use command::{CommandSpeechBackend, SpeechProgram};
