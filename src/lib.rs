//! Prospect extraction and outreach pipeline for SKÅDIS pegboard
//! accessory pages: score a page, pull commenters out as prospects,
//! compose personalized messages and keep an outreach log.

pub mod analysis;
pub mod config;
pub mod extract;
pub mod message;
pub mod outreach;
pub mod page;
pub mod storage;
pub mod web;
