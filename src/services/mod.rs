pub mod accounts;
pub mod catalog;
pub mod composer;
pub mod gateway;
pub mod import;
pub mod quiz;
pub mod recommendations;
pub mod style_filter;
