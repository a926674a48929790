use eyre::Result;
use ticket_tracker_core::{Ticket, TicketDraft};
use ticket_tracker_tests::TestCtx;

/// Creates a ticket and checks that the creation succeeded.
#[allow(unused)]
pub async fn create(ctx: &TestCtx, title: &str) -> Result<Ticket> {
    let response = ctx.api.create_ticket(&TicketDraft::new(title)).await?;
    assert_eq!(
        response.status, 201,
        "Creating a ticket titled {title:?} must answer 201 Created."
    );
    Ok(response.result?)
}
