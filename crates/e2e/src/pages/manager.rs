//! Bank manager landing screen

use crate::error::E2eResult;
use crate::webdriver::Locator;

use super::{AddCustomerPage, BasePage, CustomersPage};

pub struct ManagerPage {
    base: BasePage,
    url: String,
}

impl ManagerPage {
    pub const ADD_CUSTOMER_BUTTON: Locator = Locator::Css(r#"button[ng-class="btnClass1"]"#);
    pub const CUSTOMERS_BUTTON: Locator = Locator::Css(r#"button[ng-class="btnClass3"]"#);

    pub fn new(base: BasePage, url: impl Into<String>) -> Self {
        Self { base, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn navigate_to(self) -> E2eResult<Self> {
        self.base
            .step("Navigate to Manager Page", self.base.driver().goto(&self.url))
            .await?;
        Ok(self)
    }

    pub async fn click_add_customer(&self) -> E2eResult<AddCustomerPage> {
        self.base
            .step("Click Add Customer button", self.base.click_element(&Self::ADD_CUSTOMER_BUTTON))
            .await?;
        Ok(AddCustomerPage::new(self.base.clone()))
    }

    pub async fn click_customers(&self) -> E2eResult<CustomersPage> {
        self.base
            .step("Click Customers button", self.base.click_element(&Self::CUSTOMERS_BUTTON))
            .await?;
        Ok(CustomersPage::new(self.base.clone()))
    }
}
