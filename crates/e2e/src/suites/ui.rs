//! Customer management suite against the banking demo

use entityqa_common::datagen::{generate_name_from_post_code, generate_random_post_code, DEFAULT_LAST_NAME};

use crate::ensure;
use crate::error::E2eResult;
use crate::fixtures::BrowserSession;
use crate::pages::{CustomersPage, ManagerPage};
use crate::report::{step, Attachment};

use super::{CaseFuture, Severity, TestCase, TestContext};

pub const TAG: &str = "ui";

/// Part of the alert shown after a customer is added
pub const SUCCESS_ALERT: &str = "Customer added successfully";

const EPIC: &str = "Customer UI";
const FEATURE: &str = "Customer Management";
const STORY: &str = "Add and Manage Customers";

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "test_add_customers",
            title: "Test adding a new customer",
            description: "Test adding a new customer",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: STORY,
            severity: Severity::Critical,
            body: test_add_customers,
        },
        TestCase {
            name: "test_sort_customers",
            title: "Test sort customers",
            description: "Test adding a new customer, sorting customers by name",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: STORY,
            severity: Severity::Normal,
            body: test_sort_customers,
        },
        TestCase {
            name: "test_delete_customers",
            title: "Delete customer",
            description: "Test adding a new customer, sorting customers by name, \
                          and deleting customers with average name length",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: STORY,
            severity: Severity::Normal,
            body: test_delete_customers,
        },
    ]
}

/// Customer fields typed into the form
#[derive(Debug, Clone)]
pub struct CustomerData {
    pub first_name: String,
    pub last_name: String,
    pub post_code: String,
}

impl CustomerData {
    pub fn generate() -> E2eResult<Self> {
        let post_code = generate_random_post_code();
        let first_name = generate_name_from_post_code(&post_code)?;
        Ok(Self {
            first_name,
            last_name: DEFAULT_LAST_NAME.to_string(),
            post_code,
        })
    }
}

/// Open a browser, run `body`, then close the session whatever happened
async fn with_browser<'a, F, Fut>(ctx: &'a TestContext, body: F) -> E2eResult<()>
where
    F: FnOnce(&'a TestContext, BrowserSession) -> Fut,
    Fut: std::future::Future<Output = (BrowserSession, E2eResult<()>)> + 'a,
{
    let session = ctx.launch_browser().await?;
    let (session, result) = body(ctx, session).await;
    session.close(result.is_err()).await;
    result
}

/// Steps shared by every UI case: generate a customer and add it
async fn add_customer(ctx: &TestContext, session: &BrowserSession) -> E2eResult<ManagerPage> {
    let reporter = &*ctx.reporter;

    let customer = step(reporter, "Generate test data", async {
        let customer = CustomerData::generate()?;
        ctx.reporter.attach(
            "Test Data",
            Attachment::text(format!(
                "First Name: {}\nLast Name: {}\nPost Code: {}",
                customer.first_name, customer.last_name, customer.post_code
            )),
        );
        Ok(customer)
    })
    .await?;

    let manager = step(reporter, "Navigate to Manager Page", session.manager_page().navigate_to()).await?;

    let form = step(reporter, "Add a new customer", async {
        let form = manager.click_add_customer().await?;
        form.fill_customer_form(&customer.first_name, &customer.last_name, &customer.post_code)
            .await?;
        form.verify_form_inputs(&customer.first_name, &customer.last_name, &customer.post_code)
            .await?;
        Ok(form)
    })
    .await?;

    step(reporter, "Submit form and verify confirmation alert", async {
        let alert_text = form.submit_form().await?;
        ensure!(
            alert_text.contains(SUCCESS_ALERT),
            "Expected success message, got: {}",
            alert_text
        );
        Ok(())
    })
    .await?;

    Ok(manager)
}

async fn sort_customers(ctx: &TestContext, manager: &ManagerPage) -> E2eResult<CustomersPage> {
    let reporter = &*ctx.reporter;
    let customers = step(reporter, "Navigate to Customers Page", manager.click_customers()).await?;
    step(reporter, "Sort customers by name and verify descending order", async {
        customers.sort_by_name().await?;
        customers.verify_descending_sort().await
    })
    .await?;
    Ok(customers)
}

fn test_add_customers(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(with_browser(ctx, |ctx, session| async move {
        let result = add_customer(ctx, &session).await.map(|_| ());
        (session, result)
    }))
}

fn test_sort_customers(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(with_browser(ctx, |ctx, session| async move {
        let result = async {
            let manager = add_customer(ctx, &session).await?;
            sort_customers(ctx, &manager).await.map(|_| ())
        }
        .await;
        (session, result)
    }))
}

fn test_delete_customers(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(with_browser(ctx, |ctx, session| async move {
        let result = async {
            let manager = add_customer(ctx, &session).await?;
            let customers = sort_customers(ctx, &manager).await?;
            step(
                &*ctx.reporter,
                "Delete customers with average name length and verify deletion",
                async {
                    let expected = customers.delete_customers_with_average_name_length().await?;
                    customers.verify_deletion(&expected).await
                },
            )
            .await
        }
        .await;
        (session, result)
    }))
}
