#![forbid(unsafe_code)]
#![doc = "Cryptographic primitive adapters for ferrotls."]
//!
//! Thin uniform interfaces over the hash, MAC, cipher, big-integer, and
//! elliptic-curve primitives the TLS engine consumes. The protocol code
//! never touches a vendor API directly; everything goes through the types
//! in this crate.

pub mod aead;
pub mod aes;
pub mod dh;
pub mod dsa;
pub mod ecdh;
pub mod ecdsa;
pub mod hash;
pub mod hmac;
pub mod provider;
pub mod rand;
pub mod rsa;
