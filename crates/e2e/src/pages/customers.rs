//! Customers list

use std::collections::HashSet;

use tracing::info;

use crate::error::E2eResult;
use crate::report::Attachment;
use crate::webdriver::Locator;

use super::BasePage;

pub struct CustomersPage {
    base: BasePage,
}

impl CustomersPage {
    pub const SORT_BY_NAME_BUTTON: Locator = Locator::XPath(r#"//*[contains(@ng-click, "fName")]"#);
    pub const CUSTOMERS_TABLE: Locator = Locator::Css(r#"table[class="table table-bordered table-striped"]"#);
    pub const TABLE_ROWS: Locator = Locator::TagName("tr");
    pub const TABLE_COLUMNS: Locator = Locator::TagName("td");
    pub const DELETE_BUTTONS: Locator = Locator::XPath("//*[@ng-click='deleteCust(cust)']");

    pub fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub async fn sort_by_name(&self) -> E2eResult<()> {
        self.base
            .step("Sort customers by name", async {
                self.base.click_element(&Self::SORT_BY_NAME_BUTTON).await?;
                self.base.take_screenshot("sorted_customers").await
            })
            .await
    }

    /// Text of the first cell of every body row
    pub async fn get_first_column_data(&self) -> E2eResult<Vec<String>> {
        self.base
            .step("Get first column data from customers table", async {
                let driver = self.base.driver();
                let table = self.base.find_element(&Self::CUSTOMERS_TABLE).await?;
                let rows = driver.find_child_elements(&table, &Self::TABLE_ROWS).await?;

                let mut names = Vec::new();
                // first row is the header
                for row in rows.iter().skip(1) {
                    let cells = driver.find_child_elements(row, &Self::TABLE_COLUMNS).await?;
                    if let Some(first) = cells.first() {
                        names.push(driver.text(first).await?);
                    }
                }

                self.base
                    .reporter()
                    .attach("Customer Names", Attachment::text(names.join("\n")));
                Ok(names)
            })
            .await
    }

    pub async fn verify_descending_sort(&self) -> E2eResult<()> {
        self.base
            .step("Verify customers are sorted in descending order", async {
                let names = self.get_first_column_data().await?;
                let expected = sorted_descending_ci(&names);
                self.base
                    .step("Compare actual order with expected descending order", async {
                        crate::ensure!(
                            names == expected,
                            "customers not in descending order: got {:?}, expected {:?}",
                            names,
                            expected
                        );
                        Ok(())
                    })
                    .await
            })
            .await
    }

    /// Delete the first customer whose name length is closest to the mean
    ///
    /// Returns the names expected to remain.
    pub async fn delete_customers_with_average_name_length(&self) -> E2eResult<Vec<String>> {
        self.base
            .step("Delete first customer with average name length", async {
                let names = self.get_first_column_data().await?;
                let reporter = self.base.reporter();

                let average = average_length(&names);
                reporter.attach("Average length", Attachment::text(format!("{:.2}", average)));

                let index = index_nearest_average_length(&names);
                if let Some(i) = index {
                    reporter.attach("Name to delete", Attachment::text(format!("Index {}: {}", i, names[i])));
                }

                let delete_buttons = self.base.find_elements(&Self::DELETE_BUTTONS).await?;
                let mut expected = names.clone();

                match index {
                    Some(i) if i < delete_buttons.len() => {
                        let title = format!("Delete customer at index {}: {}", i, expected[i]);
                        self.base
                            .step(title, self.base.driver().click(&delete_buttons[i]))
                            .await?;
                        info!(name = %expected[i], "deleted customer");
                        expected.remove(i);
                    }
                    _ => info!("no customer deleted"),
                }

                self.base.take_screenshot("after_deletion").await?;
                Ok(expected)
            })
            .await
    }

    /// Compare the current table with the expected names, ignoring order
    pub async fn verify_deletion(&self, expected_names: &[String]) -> E2eResult<()> {
        self.base
            .step("Verify customer deletion", async {
                let current = self.get_first_column_data().await?;
                let expected: HashSet<&String> = expected_names.iter().collect();
                let actual: HashSet<&String> = current.iter().collect();
                crate::ensure!(
                    expected == actual,
                    "customer list after deletion differs: expected {:?}, got {:?}",
                    expected_names,
                    current
                );
                Ok(())
            })
            .await
    }
}

/// Names ordered case-insensitively, descending; ties keep their order
pub fn sorted_descending_ci(names: &[String]) -> Vec<String> {
    let mut sorted = names.to_vec();
    sorted.sort_by_cached_key(|name| std::cmp::Reverse(name.to_lowercase()));
    sorted
}

fn average_length(names: &[String]) -> f64 {
    if names.is_empty() {
        return 0.0;
    }
    let total: usize = names.iter().map(|n| n.chars().count()).sum();
    total as f64 / names.len() as f64
}

/// Index of the first name whose length is nearest the mean length
pub fn index_nearest_average_length(names: &[String]) -> Option<usize> {
    let average = average_length(names);
    let mut best: Option<(usize, f64)> = None;

    for (i, name) in names.iter().enumerate() {
        let distance = (name.chars().count() as f64 - average).abs();
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }

    best.map(|(i, _)| i)
}
