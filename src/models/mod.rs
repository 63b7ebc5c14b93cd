pub mod record;
pub mod roster;
pub mod taxonomy;
