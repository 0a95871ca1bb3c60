pub mod assembler;
pub mod config;
pub mod logging;
pub mod seqno;
