//! Dimension key value objects.

use serde::{Deserialize, Serialize};

/// Canonical key of one budget bucket.
///
/// Equality is structural. Fields are private so a key cannot change once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionKey {
    company: String,
    fiscal_period: String,
    cost_center: String,
    account: String,
    project: Option<String>,
    branch: Option<String>,
}

impl DimensionKey {
    /// Creates a key without optional dimensions.
    #[must_use]
    pub fn new(
        company: impl Into<String>,
        fiscal_period: impl Into<String>,
        cost_center: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            fiscal_period: fiscal_period.into(),
            cost_center: cost_center.into(),
            account: account.into(),
            project: None,
            branch: None,
        }
    }

    /// Returns the key with the project dimension set.
    #[must_use]
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project;
        self
    }

    /// Returns the key with the branch dimension set.
    #[must_use]
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Company.
    #[must_use]
    pub fn company(&self) -> &str {
        &self.company
    }

    /// Fiscal period name.
    #[must_use]
    pub fn fiscal_period(&self) -> &str {
        &self.fiscal_period
    }

    /// Cost center.
    #[must_use]
    pub fn cost_center(&self) -> &str {
        &self.cost_center
    }

    /// Account.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Project, when the project dimension is enforced.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Branch, when the branch dimension is enforced.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

impl std::fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.company, self.fiscal_period, self.cost_center, self.account
        )?;
        if let Some(project) = &self.project {
            write!(f, "/project={project}")?;
        }
        if let Some(branch) = &self.branch {
            write!(f, "/branch={branch}")?;
        }
        Ok(())
    }
}

/// The bucket availability is computed over.
///
/// Identical to the dimension key when budgets are controlled by account;
/// otherwise every account of a cost center shares one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetScope {
    /// Company.
    pub company: String,
    /// Fiscal period name.
    pub fiscal_period: String,
    /// Cost center.
    pub cost_center: String,
    /// Account, present only when budgets are controlled by account.
    pub account: Option<String>,
    /// Project.
    pub project: Option<String>,
    /// Branch.
    pub branch: Option<String>,
}

impl BudgetScope {
    /// Projects a key onto its control scope.
    #[must_use]
    pub fn of(key: &DimensionKey, by_account: bool) -> Self {
        Self {
            company: key.company.clone(),
            fiscal_period: key.fiscal_period.clone(),
            cost_center: key.cost_center.clone(),
            account: by_account.then(|| key.account.clone()),
            project: key.project.clone(),
            branch: key.branch.clone(),
        }
    }

    /// Returns true if ledger rows posted at `key` count against this scope.
    #[must_use]
    pub fn contains(&self, key: &DimensionKey) -> bool {
        self.company == key.company
            && self.fiscal_period == key.fiscal_period
            && self.cost_center == key.cost_center
            && self.account.as_ref().is_none_or(|a| *a == key.account)
            && self.project == key.project
            && self.branch == key.branch
    }
}

impl std::fmt::Display for BudgetScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.company,
            self.fiscal_period,
            self.cost_center,
            self.account.as_deref().unwrap_or("*")
        )?;
        if let Some(project) = &self.project {
            write!(f, "/project={project}")?;
        }
        if let Some(branch) = &self.branch {
            write!(f, "/branch={branch}")?;
        }
        Ok(())
    }
}
