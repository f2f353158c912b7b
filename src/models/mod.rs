//! Data models for Biblio

pub mod book;
pub mod datetime;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook, UpdateBook};
pub use request::{
    CreateLoanRequest, LoanRequest, LoanRequestDetails, RequestStatus, TransitionEffects,
    UpdateLoanRequest,
};
pub use user::{CreateUser, RegisterUser, Role, UpdateUser, User, UserClaims};
