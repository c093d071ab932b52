// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kiln stats --user U`

use crate::host::DetachedHost;
use crate::output::{self, OutputFormat, StatsView};
use anyhow::Result;
use kiln_core::UserId;

pub async fn stats(user: String, host: &DetachedHost, format: OutputFormat) -> Result<()> {
    let stats = host.engine().statistics(&UserId::from(user)).await?;
    output::print(&StatsView(stats), format);
    Ok(())
}
