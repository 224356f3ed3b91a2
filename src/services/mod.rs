pub mod mail;
pub use mail::{LogMailer, MailMessage, Mailer};

pub mod token;
pub use token::{Blake3TokenCodec, TokenCodec};

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogService, TaxonomyInput, TitleInput, TitlePatch};
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod feedback_service;
pub mod feedback_service_impl;
pub use feedback_service::{
    CommentInput, CommentPatch, FeedbackError, FeedbackService, ReviewInput, ReviewPatch,
};
pub use feedback_service_impl::SeaOrmFeedbackService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{
    AccountError, AccountService, ActivationInput, LoginInput, SignupInput, SignupReceipt,
    UserInput, UserPatch,
};
pub use account_service_impl::SeaOrmAccountService;
