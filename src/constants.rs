pub mod catalog {

    pub const MIN_YEAR: i32 = 1984;

    pub const MAX_YEAR: i32 = 2030;

    pub const TITLE_NAME_MAX_LEN: usize = 140;

    pub const TAXONOMY_NAME_MAX_LEN: usize = 256;

    pub const SLUG_MAX_LEN: usize = 50;
}

pub mod feedback {

    pub const MIN_SCORE: i32 = 1;

    pub const MAX_SCORE: i32 = 10;
}

pub mod accounts {

    pub const USERNAME_MAX_LEN: usize = 150;

    pub const EMAIL_MAX_LEN: usize = 254;

    /// Collides with the `/users/me` route.
    pub const RESERVED_USERNAME: &str = "me";

    pub const MIN_PASSWORD_LEN: usize = 8;

    pub const CONFIRMATION_SUBJECT: &str = "Activate your account.";
}
