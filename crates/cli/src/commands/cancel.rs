// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kiln cancel <id>` - cancel an unfinished run

use crate::host::DetachedHost;
use anyhow::Result;
use kiln_engine::EngineError;

pub async fn cancel(id: &str, host: &DetachedHost) -> Result<()> {
    let run_id = host.require(id)?;
    match host.engine().cancel(&run_id).await {
        Ok(run) => println!("Cancelled run {}", run.id),
        Err(EngineError::AlreadyTerminal { status, .. }) => {
            println!("Run {} already finished ({})", run_id, status)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
