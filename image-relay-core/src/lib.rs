#![doc = "image-relay-core: core logic library for image-relay."]

//! This crate contains the request model, the media host contract and the
//! fan-out orchestration for relaying uploaded files to a media host.
//! HTTP handling and the concrete Cloudinary client live in the `image-relay` crate.
//!
//! # Usage
//! Construct an [`orchestrator::UploadOrchestrator`] around any
//! [`contract::MediaHost`] and hand it an [`model::UploadRequest`].

pub mod contract;
pub mod model;
pub mod orchestrator;
