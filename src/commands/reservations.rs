use std::path::Path;

use chrono::Utc;

use crate::error::Result;
use crate::output::{Format, print_reservations};
use crate::store::reservations::ReservationStore;

/// Show the reservations that would block `agent` right now. Without an agent
/// every active exclusive reservation is listed.
pub fn list(store_dir: Option<&Path>, agent: Option<&str>, format: Format) -> Result<()> {
    let reservations = match store_dir {
        Some(dir) => ReservationStore::open(dir).load_effective(agent, Utc::now()),
        None => {
            tracing::warn!("no reservation directory configured");
            vec![]
        }
    };
    print_reservations(&reservations, format)
}
