pub const TITLE_WEIGHT: u32 = 3;
pub const SKILLS_WEIGHT: u32 = 2;
pub const DESCRIPTION_WEIGHT: u32 = 1;
pub const MAX_FIELD_WEIGHT: u32 = 1_000;
