mod layout;
mod renderer;
mod terminal;

pub use {
    renderer::{format_move, short_type_name, shorten_address},
    terminal::run_ui,
};
