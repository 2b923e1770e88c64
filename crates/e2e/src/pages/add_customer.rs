//! Add Customer form

use crate::error::E2eResult;
use crate::report::Attachment;
use crate::webdriver::Locator;

use super::BasePage;

pub struct AddCustomerPage {
    base: BasePage,
}

impl AddCustomerPage {
    pub const FIRST_NAME_INPUT: Locator = Locator::Css(r#"input[placeholder="First Name"]"#);
    pub const LAST_NAME_INPUT: Locator = Locator::Css(r#"input[placeholder="Last Name"]"#);
    pub const POST_CODE_INPUT: Locator = Locator::Css(r#"input[placeholder="Post Code"]"#);
    pub const ADD_CUSTOMER_BUTTON: Locator = Locator::Css(r#"button[type="submit"]"#);

    pub fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub async fn fill_customer_form(&self, first_name: &str, last_name: &str, post_code: &str) -> E2eResult<()> {
        let name = format!(
            "Fill customer form with First Name: {}, Last Name: {}, Post Code: {}",
            first_name, last_name, post_code
        );
        self.base
            .step(name, async {
                self.base.input_text(&Self::FIRST_NAME_INPUT, first_name).await?;
                self.base.input_text(&Self::LAST_NAME_INPUT, last_name).await?;
                self.base.input_text(&Self::POST_CODE_INPUT, post_code).await?;
                self.base.take_screenshot("filled_customer_form").await
            })
            .await
    }

    /// Check the inputs hold exactly what was typed
    pub async fn verify_form_inputs(&self, first_name: &str, last_name: &str, post_code: &str) -> E2eResult<()> {
        let name = format!(
            "Verify form inputs - First Name: {}, Last Name: {}, Post Code: {}",
            first_name, last_name, post_code
        );
        self.base
            .step(name, async {
                let fields = [
                    ("First Name", &Self::FIRST_NAME_INPUT, first_name),
                    ("Last Name", &Self::LAST_NAME_INPUT, last_name),
                    ("Post Code", &Self::POST_CODE_INPUT, post_code),
                ];
                for (label, locator, expected) in fields {
                    let actual = self.base.get_element_value(locator).await?.unwrap_or_default();
                    crate::ensure!(
                        actual == expected,
                        "Expected {}: '{}', but got '{}'",
                        label,
                        expected,
                        actual
                    );
                }
                Ok(())
            })
            .await
    }

    /// Submit and return the confirmation alert text
    pub async fn submit_form(&self) -> E2eResult<String> {
        self.base
            .step("Submit customer form", async {
                self.base.click_element(&Self::ADD_CUSTOMER_BUTTON).await?;
                let alert_text = self.base.wait_for_alert_and_accept().await?;
                self.base
                    .reporter()
                    .attach("Alert Text", Attachment::text(alert_text.clone()));
                Ok(alert_text)
            })
            .await
    }
}
