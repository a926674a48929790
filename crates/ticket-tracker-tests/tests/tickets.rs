use eyre::Result;
use ticket_tracker_core::{RequestKind, TicketDraft, TicketStatus};
use ticket_tracker_tests::{ApiError, TestCtxBuilder};
use util::create;

mod util;

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_seeded_store_lists_examples() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.with_seed(true).build().await?;

    let tickets = ctx.api.list_tickets().await?.result?;
    let titles: Vec<_> = tickets.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Setup CI/CD Pipeline",
            "Configure Kubernetes",
            "Implement Authentication"
        ],
        "A seeded tracker must list the three example tickets in creation order."
    );
    assert!(tickets.iter().all(|t| t.status == TicketStatus::Open));

    // The next ticket continues after the examples
    assert_eq!(create(&ctx, "Fourth").await?.id, 4);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_blank_titles_are_rejected() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;

    for title in ["", "   "] {
        let response = ctx.api.create_ticket(&TicketDraft::new(title)).await?;
        assert_eq!(response.status, 400);
        assert_eq!(
            response.result.unwrap_err(),
            ApiError::BadRequest("Title cannot be empty".into())
        );
    }

    // A body without a title is treated like an empty title
    let response = ctx.api.create_ticket(&TicketDraft::default()).await?;
    assert_eq!(response.status, 400);

    // Malformed JSON never reaches the store
    let response = ctx
        .api
        .send(RequestKind::CreateTicket, Some("{title:".into()))
        .await?;
    assert_eq!(response.status, 400);

    assert!(
        ctx.api.list_tickets().await?.result?.is_empty(),
        "Rejected tickets must not be stored."
    );

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_missing_tickets_are_not_found() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;
    let missing = 42;

    let draft = TicketDraft::new("Anything");
    assert_eq!(
        ctx.api.get_ticket(missing).await?.result.unwrap_err(),
        ApiError::NotFound
    );
    assert_eq!(
        ctx.api.update_ticket(missing, &draft).await?.result.unwrap_err(),
        ApiError::NotFound
    );
    assert_eq!(
        ctx.api
            .update_status(missing, "open")
            .await?
            .result
            .unwrap_err(),
        ApiError::NotFound
    );
    assert_eq!(
        ctx.api.delete_ticket(missing).await?.result.unwrap_err(),
        ApiError::NotFound
    );

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_update_replaces_fields() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;
    let original = ctx
        .api
        .create_ticket(&TicketDraft::new("Draft").with_description("first version"))
        .await?
        .result?;

    let updated = ctx
        .api
        .update_ticket(original.id, &TicketDraft::new("Final"))
        .await?
        .result?;
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, None);
    assert_eq!(updated.created_at, original.created_at);
    assert!(
        updated.updated_at > original.updated_at,
        "An update must move `updatedAt` forward."
    );

    let response = ctx
        .api
        .update_ticket(original.id, &TicketDraft::new(" "))
        .await?;
    assert_eq!(response.status, 400);
    assert_eq!(ctx.api.get_ticket(original.id).await?.result?, updated);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_status_names_ignore_case() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;
    let ticket = create(&ctx, "Status").await?;

    for (text, expected) in [
        ("in_progress", TicketStatus::InProgress),
        ("open", TicketStatus::Open),
        ("CLOSED", TicketStatus::Closed),
        ("Open", TicketStatus::Open),
    ] {
        let updated = ctx.api.update_status(ticket.id, text).await?.result?;
        assert_eq!(updated.status, expected, "status {text:?}");
    }

    let response = ctx.api.update_status(ticket.id, "unknown").await?;
    assert_eq!(
        response.result.unwrap_err(),
        ApiError::BadRequest("Invalid status. Must be one of: OPEN, IN_PROGRESS, CLOSED".into())
    );

    let response = ctx
        .api
        .send(RequestKind::UpdateStatus(ticket.id), Some("{}".into()))
        .await?;
    assert_eq!(response.status, 400);
    assert!(response.body.unwrap().contains("Status is required"));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_ids_are_never_reused() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;

    let first = create(&ctx, "first").await?;
    let second = create(&ctx, "second").await?;
    ctx.api.delete_ticket(second.id).await?.result?;
    ctx.api.delete_ticket(first.id).await?.result?;

    let third = create(&ctx, "third").await?;
    assert!(third.id > second.id, "Deleted ids must not be handed out again.");

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_responses_carry_request_id() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;

    let response = ctx.api.send(RequestKind::ListTickets, None).await?;
    assert_eq!(response.status, 200);
    assert!(response.request_id.is_some());

    ctx.finish().await;
    Ok(())
}
