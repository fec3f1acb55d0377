use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info};

use crate::model::ledger::{AccountType, ChartAccount};
use crate::payroll::error::PayrollError;
use crate::payroll::store::ChartOfAccounts;

/// Accounts every payroll journal needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollAccounts {
    pub expense: String,
    pub cash: String,
    pub tax: String,
    pub bpjs: String,
    pub payable: String,
}

#[derive(Debug, Clone, Copy)]
struct RoleCriteria {
    role: &'static str,
    account_type: AccountType,
    keywords: &'static [&'static str],
}

const EXPENSE: RoleCriteria = RoleCriteria {
    role: "expense",
    account_type: AccountType::Expense,
    keywords: &["gaji", "salary", "payroll", "wage"],
};
const CASH: RoleCriteria = RoleCriteria {
    role: "cash",
    account_type: AccountType::Asset,
    keywords: &["kas", "cash", "bank"],
};
const TAX: RoleCriteria = RoleCriteria {
    role: "tax",
    account_type: AccountType::Liability,
    keywords: &["pph", "tax", "pajak"],
};
const BPJS: RoleCriteria = RoleCriteria {
    role: "bpjs",
    account_type: AccountType::Liability,
    keywords: &["bpjs", "jamsostek", "social security"],
};
const PAYABLE: RoleCriteria = RoleCriteria {
    role: "payroll payable",
    account_type: AccountType::Liability,
    keywords: &[
        "hutang gaji",
        "utang gaji",
        "salary payable",
        "payroll payable",
        "wages payable",
    ],
};

/// Active account of the right type whose name contains a keyword, else the
/// first active account of that type by code.
fn pick<'a>(accounts: &'a [ChartAccount], criteria: &RoleCriteria) -> Option<&'a ChartAccount> {
    let mut candidates: Vec<&ChartAccount> = accounts
        .iter()
        .filter(|a| a.is_active && a.account_type == criteria.account_type)
        .collect();
    candidates.sort_by(|a, b| a.code.cmp(&b.code));

    candidates
        .iter()
        .find(|a| {
            let name = a.name.to_lowercase();
            criteria.keywords.iter().any(|k| name.contains(k))
        })
        .or_else(|| candidates.first())
        .copied()
}

pub fn resolve_accounts(accounts: &[ChartAccount]) -> Result<PayrollAccounts, PayrollError> {
    let mut missing = Vec::new();
    let mut code_for = |criteria: RoleCriteria| match pick(accounts, &criteria) {
        Some(account) => account.code.clone(),
        None => {
            missing.push(criteria.role);
            String::new()
        }
    };

    let resolved = PayrollAccounts {
        expense: code_for(EXPENSE),
        cash: code_for(CASH),
        tax: code_for(TAX),
        bpjs: code_for(BPJS),
        payable: code_for(PAYABLE),
    };

    if !missing.is_empty() {
        return Err(PayrollError::AccountsNotConfigured(missing.join(", ")));
    }
    Ok(resolved)
}

const CACHE_KEY: &str = "payroll";

/// Resolves and caches [`PayrollAccounts`]. Failures are never cached.
pub struct AccountResolver {
    chart: Arc<dyn ChartOfAccounts>,
    cache: Cache<&'static str, PayrollAccounts>,
}

impl AccountResolver {
    pub fn new(chart: Arc<dyn ChartOfAccounts>, ttl: Duration) -> Self {
        Self {
            chart,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    pub async fn resolve(&self) -> Result<PayrollAccounts, PayrollError> {
        if let Some(accounts) = self.cache.get(&CACHE_KEY).await {
            debug!("Payroll accounts served from cache");
            return Ok(accounts);
        }

        let chart = self.chart.list_accounts().await?;
        let accounts = resolve_accounts(&chart)?;
        info!(
            expense = %accounts.expense,
            cash = %accounts.cash,
            tax = %accounts.tax,
            bpjs = %accounts.bpjs,
            payable = %accounts.payable,
            "Payroll accounts resolved"
        );
        self.cache.insert(CACHE_KEY, accounts.clone()).await;
        Ok(accounts)
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&CACHE_KEY).await;
    }
}
