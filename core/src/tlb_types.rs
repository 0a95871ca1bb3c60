pub mod block;
pub mod traits;
