pub mod glob_cmd;
pub mod guess_cmd;
pub mod inspect_cmd;

pub use glob_cmd::cmd_glob;
pub use guess_cmd::{cmd_guess, GuessOptions};
pub use inspect_cmd::cmd_inspect;
