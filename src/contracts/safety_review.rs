//! SafetyReview contract interface
//! Stores reviews, tracks registered users and pays token rewards
use ethers::prelude::*;

// Tuple-returning functions are easier to bind from the compiled ABI
abigen!(SafetyReview, "abi/SafetyReview.json");
