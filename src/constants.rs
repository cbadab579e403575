pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;

pub const RECIPE_NAME_LENGTH: usize = 256;
pub const EMAIL_LENGTH: usize = 254;
pub const USERNAME_LENGTH: usize = 150;
pub const FIRST_NAME_LENGTH: usize = 150;
pub const LAST_NAME_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub const SHORT_CODE_LENGTH: usize = 8;
pub const SHORT_LINK_TTL_SECONDS: u64 = 60 * 60 * 24;
pub const SHORT_LINK_PATH: &str = "/s";

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
