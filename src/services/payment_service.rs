// ==================== PAYMENT SERVICE ====================
// Manual payment flow for approved requests: the service formats a message
// with bank / UPI details, the staff member pays out of band and sends the
// screenshot on WhatsApp, an administrator then records and reviews it.
// There is no payment gateway behind any of this.

use crate::{
    config::PaymentConfig,
    models::{ApprovalStatus, PaymentApprovalRequest, Permission, UpdatePaymentRequest},
    services::permission_service::get_request,
    state::AppState,
    utils::{parse_object_id, AppError, AppResult},
};

/// Fixed-template payment message for one request.
pub fn build_payment_message(request: &Permission, config: &PaymentConfig) -> String {
    let staff_name = request.staff_name.as_deref().unwrap_or("Staff member");

    format!(
        "Hello {staff_name},\n\
         \n\
         Your request for {batch} additional follower slots has been approved.\n\
         To activate it please pay {amount} {currency}.\n\
         \n\
         Staff ID: {staff_id}\n\
         Request ID: {request_id}\n\
         \n\
         UPI: {upi}\n\
         Bank: {bank}\n\
         Account holder: {holder}\n\
         Account number: {account}\n\
         IFSC: {ifsc}\n\
         \n\
         After paying, send the payment screenshot with your Staff ID on WhatsApp to {phone}.\n\
         \n\
         Thank you,\n\
         SwapKnowledge",
        staff_name = staff_name,
        batch = request.batch_size,
        amount = config.amount,
        currency = config.currency,
        staff_id = request.staff_id,
        request_id = request.id.map(|id| id.to_hex()).unwrap_or_default(),
        upi = config.upi_id,
        bank = config.bank_name,
        holder = config.account_holder,
        account = config.account_number,
        ifsc = config.ifsc,
        phone = config.phone,
    )
}

/// POST /requests/{id}/payment-message
pub async fn send_payment_message(state: &AppState, id: &str) -> AppResult<Permission> {
    let request = get_request(state, id).await?;
    let config = &state.config.payment;
    let message = build_payment_message(&request, config);

    let mut next = request.clone();
    next.record_payment_message(message, config.amount as i64, chrono::Utc::now().timestamp())
        .map_err(AppError::InvalidRequest)?;

    let updated = store_payment(state, id, &request, next).await?;
    log::info!("💬 Payment message prepared for request {}", id);
    Ok(updated)
}

/// PUT /requests/{id}/payment - manual "Paid" / "Pending" flag
pub async fn update_payment(state: &AppState, id: &str, body: UpdatePaymentRequest) -> AppResult<Permission> {
    let request = get_request(state, id).await?;
    let now = chrono::Utc::now().timestamp();
    let mut next = request.clone();

    let transaction_id = body
        .transaction_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let transition = match body.payment_status.trim().to_ascii_lowercase().as_str() {
        "paid" => next.mark_paid(transaction_id, now),
        "pending" | "unpaid" => next.mark_unpaid(now),
        _ => {
            return Err(AppError::InvalidRequest(
                "Invalid payment status. Must be one of: Paid, Pending".to_string(),
            ))
        }
    };
    transition.map_err(AppError::InvalidRequest)?;

    let updated = store_payment(state, id, &request, next).await?;
    log::info!("💰 Payment of request {} marked {}", id, updated.payment.payment_status());
    Ok(updated)
}

/// PUT /requests/{id}/payment-approval - admin verdict on a reported payment
pub async fn review_payment(state: &AppState, id: &str, body: PaymentApprovalRequest) -> AppResult<Permission> {
    let approve = match ApprovalStatus::parse(&body.status) {
        Some(ApprovalStatus::Approved) => true,
        Some(ApprovalStatus::Rejected) => false,
        _ => {
            return Err(AppError::InvalidRequest(
                "Invalid payment approval status. Must be one of: Approved, Rejected".to_string(),
            ))
        }
    };

    let request = get_request(state, id).await?;
    let mut next = request.clone();
    next.review_payment(approve, body.reason, chrono::Utc::now().timestamp())
        .map_err(AppError::InvalidRequest)?;

    let updated = store_payment(state, id, &request, next).await?;
    log::info!(
        "🧾 Payment of request {} {}",
        id,
        if approve { "verified" } else { "declined" }
    );
    Ok(updated)
}

async fn store_payment(state: &AppState, id: &str, before: &Permission, after: Permission) -> AppResult<Permission> {
    let object_id = parse_object_id(id, "request")?;
    state
        .permissions
        .update_payment(object_id, &before.payment, after.payment, after.updated_at)
        .await?
        .ok_or_else(|| AppError::Conflict("Request was modified concurrently, please retry".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentState, SendPermissionRequest};
    use crate::services::permission_service::{send_request, update_request_status};
    use crate::state::test_config;

    async fn approved_request(state: &AppState) -> String {
        let request = send_request(
            state,
            "staff-9",
            SendPermissionRequest {
                staff_name: Some("Meera".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = request.id.unwrap().to_hex();
        update_request_status(state, &id, "approved").await.unwrap();
        id
    }

    fn paid(transaction_id: Option<&str>) -> UpdatePaymentRequest {
        UpdatePaymentRequest {
            payment_status: "Paid".into(),
            transaction_id: transaction_id.map(str::to_string),
        }
    }

    #[test]
    fn test_message_template() {
        let config = test_config().payment;
        let mut request = Permission::new(crate::models::RequestType::CapacityIncrease, "staff-9", 50);
        request.staff_name = Some("Meera".into());

        let message = build_payment_message(&request, &config);
        assert!(message.starts_with("Hello Meera,"));
        assert!(message.contains("Staff ID: staff-9"));
        assert!(message.contains(&format!("{} {}", config.amount, config.currency)));
        assert!(message.contains(&config.upi_id));
        assert!(message.contains(&config.phone));
        assert!(message.contains("50 additional follower slots"));
    }

    #[tokio::test]
    async fn test_pending_request_cannot_get_payment_message() {
        let state = AppState::in_memory(test_config());
        let request = send_request(&state, "staff-9", SendPermissionRequest::default()).await.unwrap();

        let err = send_payment_message(&state, &request.id.unwrap().to_hex()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_cannot_mark_paid_before_message() {
        let state = AppState::in_memory(test_config());
        let id = approved_request(&state).await;

        let err = update_payment(&state, &id, paid(Some("TX1"))).await.unwrap_err();
        assert_eq!(err.to_string(), "Payment message has not been sent yet");
    }

    #[tokio::test]
    async fn test_full_payment_flow() {
        let state = AppState::in_memory(test_config());
        let id = approved_request(&state).await;

        let sent = send_payment_message(&state, &id).await.unwrap();
        assert!(matches!(sent.payment, PaymentState::AwaitingPayment { .. }));
        assert!(sent.payment.message().unwrap().contains("Meera"));

        let paid_request = update_payment(&state, &id, paid(Some(" TX-77 "))).await.unwrap();
        assert_eq!(paid_request.payment.payment_status(), "Paid");
        assert_eq!(paid_request.payment.transaction_id(), Some("TX-77"));

        let verified = review_payment(
            &state,
            &id,
            PaymentApprovalRequest {
                status: "approved".into(),
                reason: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(verified.payment.approval_status(), ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn test_payment_can_be_reset_to_pending() {
        let state = AppState::in_memory(test_config());
        let id = approved_request(&state).await;
        send_payment_message(&state, &id).await.unwrap();
        update_payment(&state, &id, paid(None)).await.unwrap();

        let reset = update_payment(
            &state,
            &id,
            UpdatePaymentRequest {
                payment_status: "pending".into(),
                transaction_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(reset.payment.payment_status(), "Pending");
    }

    #[tokio::test]
    async fn test_unknown_payment_status() {
        let state = AppState::in_memory(test_config());
        let id = approved_request(&state).await;
        let err = update_payment(
            &state,
            &id,
            UpdatePaymentRequest {
                payment_status: "refunded".into(),
                transaction_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_follow_permission_gets_no_payment_message() {
        let state = AppState::in_memory(test_config());
        let request = send_request(
            &state,
            "staff-9",
            SendPermissionRequest {
                request_type: Some(crate::models::RequestType::FollowPermission),
                student_id: Some("student-1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let id = request.id.unwrap().to_hex();
        update_request_status(&state, &id, "approved").await.unwrap();

        let err = send_payment_message(&state, &id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(get_request(&state, &id).await.unwrap().payment, PaymentState::NotRequested);
    }

    #[tokio::test]
    async fn test_declined_payment_stays_declined() {
        let state = AppState::in_memory(test_config());
        let id = approved_request(&state).await;
        send_payment_message(&state, &id).await.unwrap();
        update_payment(&state, &id, paid(Some("TX-1"))).await.unwrap();
        review_payment(
            &state,
            &id,
            PaymentApprovalRequest {
                status: "rejected".into(),
                reason: Some("amount mismatch".into()),
            },
        )
        .await
        .unwrap();

        let err = send_payment_message(&state, &id).await.unwrap_err();
        assert_eq!(err.to_string(), "Payment was already reviewed");
        assert_eq!(
            get_request(&state, &id).await.unwrap().payment.approval_status(),
            ApprovalStatus::Rejected
        );
    }
}
