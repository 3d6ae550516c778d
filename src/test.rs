//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::db::Db;
use crate::model::{JobInfo, NewUser, Role, User};
use crate::Config;
use tempfile::TempDir;

/// The password every test user is created with.
pub const TEST_PASSWORD: &str = "correct horse";

/// Test environment that sets up a towbill home directory with Config and a seeded database.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with Config and initialized database.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("towbill");
        let config = Config::create(&root, None).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    pub fn db(&self) -> &Db {
        self.config.db()
    }

    /// Creates a regular user with no company.
    pub async fn user(&self, username: &str) -> User {
        self.create(username, Role::User, None).await
    }

    /// Creates a regular user belonging to `company_id`.
    pub async fn user_in(&self, username: &str, company_id: Option<i64>) -> User {
        self.create(username, Role::User, company_id).await
    }

    pub async fn admin(&self, username: &str) -> User {
        self.create(username, Role::Admin, None).await
    }

    async fn create(&self, username: &str, role: Role, company_id: Option<i64>) -> User {
        self.db()
            .create_user(&NewUser {
                username: username.to_string(),
                password: TEST_PASSWORD.to_string(),
                role,
                company_id,
            })
            .await
            .unwrap()
    }
}

/// A valid job with the given invoice number and weight and a 15% fuel surcharge.
pub fn job_info(invoice_number: &str, vehicle_weight: i64) -> JobInfo {
    JobInfo {
        customer_name: "Acme Freight".to_string(),
        invoice_number: invoice_number.to_string(),
        vehicle_type: "Tractor trailer".to_string(),
        vehicle_weight,
        problem_description: "Jackknifed on I-40".to_string(),
        fuel_surcharge: 15.0,
    }
}
