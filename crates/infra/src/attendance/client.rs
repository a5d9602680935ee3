use rollcall_domain::{
    AttendanceAck, ClockInRequest, ClockOutRequest, CurrentUser, InTimeStatus, OutTimeStatus,
};
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone)]
pub struct AttendanceClient {
    api: ApiClient,
}

impl AttendanceClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    /// Any [`ApiError`] from the request pipeline
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.api.get(&self.api.config().routes.current_user).await
    }

    /// Whether the user has already clocked in today.
    ///
    /// # Errors
    /// Any [`ApiError`] from the request pipeline
    pub async fn has_in_time_today(&self) -> Result<bool, ApiError> {
        let status: InTimeStatus =
            self.api.get(&self.api.config().routes.has_in_time_today).await?;
        Ok(status.has_in_time)
    }

    /// Whether the user has already clocked out today.
    ///
    /// # Errors
    /// Any [`ApiError`] from the request pipeline
    pub async fn has_out_time_today(&self) -> Result<bool, ApiError> {
        let status: OutTimeStatus =
            self.api.get(&self.api.config().routes.has_out_time_today).await?;
        Ok(status.has_out_time)
    }

    /// # Errors
    /// Any [`ApiError`] from the request pipeline
    #[instrument(skip_all, fields(matched = request.is_face_matched))]
    pub async fn clock_in(&self, request: &ClockInRequest) -> Result<AttendanceAck, ApiError> {
        let ack: AttendanceAck = self.api.post(&self.api.config().routes.clock_in, request).await?;
        debug!(status = ack.status, "clock-in recorded");
        Ok(ack)
    }

    /// # Errors
    /// Any [`ApiError`] from the request pipeline
    #[instrument(skip_all)]
    pub async fn clock_out(&self, request: &ClockOutRequest) -> Result<AttendanceAck, ApiError> {
        let ack: AttendanceAck =
            self.api.post(&self.api.config().routes.clock_out, request).await?;
        debug!(status = ack.status, "clock-out recorded");
        Ok(ack)
    }
}
