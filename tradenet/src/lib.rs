pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    apply_rank_overrides, expand_path, load_config, load_records, parse_role, resolve_ranks,
    write_output,
};
