use crate::domain::model::{ProductId, UpdateOutcome};
use crate::domain::ports::ProductStore;
use crate::utils::error::Result;
use crate::utils::validation::require_text;
use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpvoteOutcome {
    /// The voter was already in the voter set; nothing changed.
    Duplicate,
    /// Result of the conditional update. `matched_count == 0` means the product does not exist.
    Applied(UpdateOutcome),
}

impl UpvoteOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, UpvoteOutcome::Duplicate)
    }
}

impl Serialize for UpvoteOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            UpvoteOutcome::Duplicate => {
                let mut s = serializer.serialize_struct("UpvoteOutcome", 1)?;
                s.serialize_field("duplicate", &true)?;
                s.end()
            }
            UpvoteOutcome::Applied(outcome) => outcome.serialize(serializer),
        }
    }
}

/// Records `voter` as an upvoter of `product_id`.
///
/// The increment and the voter-set insertion happen in one conditional update,
/// so concurrent requests from the same voter can never both count. When that
/// update matches nothing, a read distinguishes "already voted" from
/// "no such product"; the read cannot affect the stored counters.
pub async fn upvote(
    store: &dyn ProductStore,
    product_id: &ProductId,
    voter: &str,
) -> Result<UpvoteOutcome> {
    require_text("voter", voter)?;

    let outcome = store.add_vote_if_absent(product_id, voter).await?;
    if outcome.matched_count > 0 {
        tracing::info!("👍 {} upvoted product {}", voter, product_id);
        return Ok(UpvoteOutcome::Applied(outcome));
    }

    if store.get_product(product_id).await?.is_some() {
        tracing::debug!("Duplicate vote from {} on product {}", voter, product_id);
        Ok(UpvoteOutcome::Duplicate)
    } else {
        tracing::debug!("Upvote for unknown product {}", product_id);
        Ok(UpvoteOutcome::Applied(outcome))
    }
}
