mod util;

pub use util::{read_game_config, split_csv};
