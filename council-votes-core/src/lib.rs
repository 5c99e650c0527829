#![doc = "council-votes-core: core logic library for council-votes."]

//! This crate holds the domain model and the scrape pipeline for council
//! voting records: listing meetings from an eScribe portal, locating and
//! parsing minutes, and writing meetings, motions and votes to a linked-table
//! store through the [`contract::RecordStore`] trait.
//!
//! # Usage
//! Build a [`config::RunConfig`] from [`config::Settings`], construct a
//! [`download::EscribeClient`] and a store, then call
//! [`synchronise::synchronise`].

pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod locate;
pub mod model;
pub mod parse;
pub mod synchronise;
pub mod uploader;
