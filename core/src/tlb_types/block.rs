pub mod message;
pub mod out_action;
pub mod state_init;
