use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== REQUEST TYPES ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum RequestType {
    /// Staff member needs another batch of follower slots
    CapacityIncrease,
    /// Student asks a staff member directly for permission to follow
    FollowPermission,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::CapacityIncrease => "CapacityIncrease",
            RequestType::FollowPermission => "FollowPermission",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== APPROVAL ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Case-insensitive parse of "pending" / "APPROVED" / " Rejected ".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum ApprovalState {
    Pending,
    Approved { approved_at: i64 },
    Rejected { rejected_at: i64 },
}

impl ApprovalState {
    pub fn status(&self) -> ApprovalStatus {
        match self {
            ApprovalState::Pending => ApprovalStatus::Pending,
            ApprovalState::Approved { .. } => ApprovalStatus::Approved,
            ApprovalState::Rejected { .. } => ApprovalStatus::Rejected,
        }
    }
}

// ==================== BATCH ====================

/// Lifecycle of the extra follower slots granted by a capacity request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum BatchState {
    /// Not approved yet, or not a capacity request
    Unallocated,
    Open {
        approved_count: i64,
        opened_at: i64,
    },
    Complete {
        approved_count: i64,
        opened_at: i64,
        completed_at: i64,
    },
    /// Revoked while open; follows already admitted are kept
    Closed {
        approved_count: i64,
        opened_at: i64,
        closed_at: i64,
    },
}

impl BatchState {
    pub fn approved_count(&self) -> i64 {
        match self {
            BatchState::Unallocated => 0,
            BatchState::Open { approved_count, .. }
            | BatchState::Complete { approved_count, .. }
            | BatchState::Closed { approved_count, .. } => *approved_count,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, BatchState::Open { .. })
    }
}

// ==================== PAYMENT ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum PaymentState {
    NotRequested,
    AwaitingPayment {
        message: String,
        amount: i64,
        sent_at: i64,
    },
    Paid {
        message: String,
        amount: i64,
        transaction_id: Option<String>,
        paid_at: i64,
    },
    Verified {
        amount: i64,
        transaction_id: Option<String>,
        paid_at: i64,
        verified_at: i64,
    },
    Declined {
        amount: i64,
        transaction_id: Option<String>,
        reason: Option<String>,
        declined_at: i64,
    },
}

impl PaymentState {
    /// Flat status as shown to clients: NotRequested / Pending / Paid
    pub fn payment_status(&self) -> &'static str {
        match self {
            PaymentState::NotRequested => "NotRequested",
            PaymentState::AwaitingPayment { .. } => "Pending",
            PaymentState::Paid { .. }
            | PaymentState::Verified { .. }
            | PaymentState::Declined { .. } => "Paid",
        }
    }

    /// Admin verdict on a reported payment
    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            PaymentState::Verified { .. } => ApprovalStatus::Approved,
            PaymentState::Declined { .. } => ApprovalStatus::Rejected,
            _ => ApprovalStatus::Pending,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            PaymentState::AwaitingPayment { message, .. } | PaymentState::Paid { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            PaymentState::Paid { transaction_id, .. }
            | PaymentState::Verified { transaction_id, .. }
            | PaymentState::Declined { transaction_id, .. } => transaction_id.as_deref(),
            _ => None,
        }
    }
}

// ==================== PERMISSION ====================

/// Capacity / follow permission request (stored in `permissions`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub request_type: RequestType,
    pub staff_id: String,
    pub staff_name: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub message: Option<String>,
    pub batch_size: i64,
    pub approval: ApprovalState,
    pub batch: BatchState,
    pub payment: PaymentState,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Permission {
    pub fn new(request_type: RequestType, staff_id: &str, batch_size: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Permission {
            id: None,
            request_type,
            staff_id: staff_id.to_string(),
            staff_name: None,
            student_id: None,
            student_name: None,
            message: None,
            batch_size,
            approval: ApprovalState::Pending,
            batch: BatchState::Unallocated,
            payment: PaymentState::NotRequested,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ApprovalStatus {
        self.approval.status()
    }

    /// Slots still free in this request's batch (0 unless the batch is open)
    pub fn remaining_slots(&self) -> i64 {
        match self.batch {
            BatchState::Open { approved_count, .. } => (self.batch_size - approved_count).max(0),
            _ => 0,
        }
    }

    /// Move the approval state machine to `target`.
    ///
    /// Returns `Ok(false)` when the request already is in `target`.
    pub fn apply_status(&mut self, target: ApprovalStatus, now: i64) -> Result<bool, String> {
        let current = self.status();
        if current == target {
            return Ok(false);
        }

        match (current, target) {
            (ApprovalStatus::Pending, ApprovalStatus::Approved)
            | (ApprovalStatus::Rejected, ApprovalStatus::Approved) => {
                if self.batch != BatchState::Unallocated {
                    return Err("A revoked request cannot be approved again".to_string());
                }
                self.approval = ApprovalState::Approved { approved_at: now };
                if self.request_type == RequestType::CapacityIncrease {
                    self.batch = BatchState::Open {
                        approved_count: 0,
                        opened_at: now,
                    };
                }
            }
            (ApprovalStatus::Pending, ApprovalStatus::Rejected) => {
                self.approval = ApprovalState::Rejected { rejected_at: now };
            }
            (ApprovalStatus::Approved, ApprovalStatus::Rejected) => {
                self.approval = ApprovalState::Rejected { rejected_at: now };
                if let BatchState::Open {
                    approved_count,
                    opened_at,
                } = self.batch
                {
                    self.batch = BatchState::Closed {
                        approved_count,
                        opened_at,
                        closed_at: now,
                    };
                }
            }
            (ApprovalStatus::Rejected, ApprovalStatus::Pending) => {
                if self.batch != BatchState::Unallocated {
                    return Err("A revoked request cannot be reopened".to_string());
                }
                self.approval = ApprovalState::Pending;
            }
            (from, to) => {
                return Err(format!("Cannot move request from {} to {}", from, to));
            }
        }

        self.updated_at = now;
        Ok(true)
    }

    /// Store a freshly formatted payment message.
    pub fn record_payment_message(&mut self, message: String, amount: i64, now: i64) -> Result<(), String> {
        if self.request_type != RequestType::CapacityIncrease {
            return Err("Payment is only requested for capacity increases".to_string());
        }
        if self.status() != ApprovalStatus::Approved {
            return Err("Payment can only be requested for approved requests".to_string());
        }

        match self.payment {
            PaymentState::NotRequested | PaymentState::AwaitingPayment { .. } => {
                self.payment = PaymentState::AwaitingPayment {
                    message,
                    amount,
                    sent_at: now,
                };
                self.updated_at = now;
                Ok(())
            }
            PaymentState::Paid { .. } | PaymentState::Verified { .. } => {
                Err("Payment was already made for this request".to_string())
            }
            PaymentState::Declined { .. } => Err("Payment was already reviewed".to_string()),
        }
    }

    pub fn mark_paid(&mut self, transaction_id: Option<String>, now: i64) -> Result<(), String> {
        match &self.payment {
            PaymentState::AwaitingPayment { message, amount, .. } => {
                self.payment = PaymentState::Paid {
                    message: message.clone(),
                    amount: *amount,
                    transaction_id,
                    paid_at: now,
                };
            }
            PaymentState::Paid {
                message,
                amount,
                transaction_id: previous,
                paid_at,
            } => {
                self.payment = PaymentState::Paid {
                    message: message.clone(),
                    amount: *amount,
                    transaction_id: transaction_id.or_else(|| previous.clone()),
                    paid_at: *paid_at,
                };
            }
            PaymentState::NotRequested => {
                return Err("Payment message has not been sent yet".to_string());
            }
            PaymentState::Verified { .. } | PaymentState::Declined { .. } => {
                return Err("Payment was already reviewed".to_string());
            }
        }

        self.updated_at = now;
        Ok(())
    }

    /// Undo a reported payment (back to awaiting payment)
    pub fn mark_unpaid(&mut self, now: i64) -> Result<(), String> {
        match &self.payment {
            PaymentState::Paid {
                message, amount, ..
            } => {
                self.payment = PaymentState::AwaitingPayment {
                    message: message.clone(),
                    amount: *amount,
                    sent_at: now,
                };
                self.updated_at = now;
                Ok(())
            }
            PaymentState::AwaitingPayment { .. } => Ok(()),
            PaymentState::NotRequested => Err("Payment message has not been sent yet".to_string()),
            PaymentState::Verified { .. } | PaymentState::Declined { .. } => {
                Err("Payment was already reviewed".to_string())
            }
        }
    }

    pub fn review_payment(&mut self, approve: bool, reason: Option<String>, now: i64) -> Result<(), String> {
        let (amount, transaction_id, paid_at) = match &self.payment {
            PaymentState::Paid {
                amount,
                transaction_id,
                paid_at,
                ..
            } => (*amount, transaction_id.clone(), *paid_at),
            _ => return Err("Only paid requests can be reviewed".to_string()),
        };

        self.payment = if approve {
            PaymentState::Verified {
                amount,
                transaction_id,
                paid_at,
                verified_at: now,
            }
        } else {
            PaymentState::Declined {
                amount,
                transaction_id,
                reason,
                declined_at: now,
            }
        };
        self.updated_at = now;
        Ok(())
    }
}

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendPermissionRequest {
    pub request_type: Option<RequestType>,
    pub staff_name: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PermissionQuery {
    pub staff_id: Option<String>,
    pub status: Option<String>,
    pub request_type: Option<RequestType>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PaymentApprovalRequest {
    pub status: String,
    pub reason: Option<String>,
}

/// Flat view of a request as returned by the API
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub id: String,
    pub request_type: RequestType,
    pub staff_id: String,
    pub staff_name: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub message: Option<String>,
    pub status: ApprovalStatus,
    pub batch_size: i64,
    pub approved_count: i64,
    pub is_batch_complete: bool,
    pub is_batch_active: bool,
    pub payment_status: String,
    pub payment_approval_status: ApprovalStatus,
    pub payment_message: Option<String>,
    pub payment_message_sent: bool,
    pub transaction_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        PermissionResponse {
            id: permission.id.map(|id| id.to_hex()).unwrap_or_default(),
            request_type: permission.request_type,
            status: permission.status(),
            batch_size: permission.batch_size,
            approved_count: permission.batch.approved_count(),
            is_batch_complete: matches!(permission.batch, BatchState::Complete { .. }),
            is_batch_active: permission.batch.is_open(),
            payment_status: permission.payment.payment_status().to_string(),
            payment_approval_status: permission.payment.approval_status(),
            payment_message: permission.payment.message().map(str::to_string),
            payment_message_sent: permission.payment != PaymentState::NotRequested,
            transaction_id: permission.payment.transaction_id().map(str::to_string),
            staff_id: permission.staff_id,
            staff_name: permission.staff_name,
            student_id: permission.student_id,
            student_name: permission.student_name,
            message: permission.message,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
        }
    }
}
