use mockall::mock;
use spawn_common::Kobo;
use spawn_engine::{
    payment_objects::{PaymentInitialization, PaymentRequest, PaymentVerification},
    PaymentGateway,
    PaymentGatewayError,
};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn verify_payment(&self, reference: &str) -> Result<PaymentVerification, PaymentGatewayError>;
        async fn initialize_payment(&self, request: PaymentRequest) -> Result<PaymentInitialization, PaymentGatewayError>;
        async fn refund_payment(&self, reference: &str) -> Result<(), PaymentGatewayError>;
        async fn transfer_to_seller(&self, recipient: &str, amount: Kobo, reason: &str) -> Result<(), PaymentGatewayError>;
    }
}
