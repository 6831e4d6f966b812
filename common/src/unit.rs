//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity submission for a review.
#[derive(Clone, Copy, Debug)]
pub struct Submission;

/// Marker type describing an entity approval.
#[derive(Clone, Copy, Debug)]
pub struct Approval;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
