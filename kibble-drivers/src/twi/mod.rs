//! Two-wire bus peripherals

pub mod bitbang;

pub use bitbang::BitBangTwi;
