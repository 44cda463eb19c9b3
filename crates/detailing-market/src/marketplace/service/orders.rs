use tracing::info;

use super::{details, query, require_owner, require_principal, MarketplaceService};
use crate::marketplace::domain::{ActorContext, OrderId, OrderResponseId, ResourceKind, Role};
use crate::marketplace::error::MarketError;
use crate::marketplace::lifecycle::ListingQuery;
use crate::marketplace::order::{AcceptedBid, NewOrder, Order, OrderResponse, OrderStatus};
use crate::marketplace::repository::{Entity, MarketStore, Notifier};

impl<S, N> MarketplaceService<S, N>
where
    S: MarketStore + 'static,
    N: Notifier + 'static,
{
    pub fn order(&self, id: &OrderId) -> Result<Order, MarketError> {
        self.store()
            .orders()
            .fetch(id)?
            .ok_or_else(|| MarketError::not_found(Order::KIND, id))
    }

    pub fn list_orders(&self, filter: &ListingQuery<OrderStatus>) -> Result<Vec<Order>, MarketError> {
        query(self.store().orders(), filter)
    }

    pub fn create_order(&self, ctx: &ActorContext, new: NewOrder) -> Result<Order, MarketError> {
        self.require_role(ctx, &[Role::Client], "place orders")?;

        let _gate = self.creation_gate()?;
        self.admit(&ctx.account_id, ResourceKind::Order)?;
        let order = Order::open(ctx.account_id.clone(), new, self.now())?;
        let stored = self.store().orders().insert(order)?;

        info!(order_id = %stored.id, client_id = %stored.client_id, service = %stored.service, "order placed");
        Ok(stored)
    }

    pub fn delete_order(&self, ctx: &ActorContext, id: &OrderId) -> Result<Order, MarketError> {
        let order = self.order(id)?;
        require_owner(ctx, &order.client_id, "delete this order")?;

        let removed = self
            .store()
            .orders()
            .delete(id)?
            .ok_or_else(|| MarketError::not_found(Order::KIND, id))?;
        info!(order_id = %id, responses = removed.responses.len(), "order deleted");
        Ok(removed)
    }

    /// Bid on an order as a specialist or a company.
    pub fn respond_to_order(
        &self,
        ctx: &ActorContext,
        id: &OrderId,
        price: u32,
        message: String,
    ) -> Result<OrderResponse, MarketError> {
        self.require_role(ctx, &[Role::Specialist, Role::Employer], "bid on orders")?;
        require_principal(ctx, "bid on orders")?;
        let now = self.now();
        let (order, response) = self.mutate(self.store().orders(), id, |order| {
            order.respond(ctx.account_id.clone(), ctx.role, price, message.clone(), now)
        })?;

        info!(order_id = %id, response_id = %response.id, price, "order response placed");
        self.notify(
            "order.response_received",
            &order.client_id,
            details([
                ("order_id", id.to_string()),
                ("response_id", response.id.to_string()),
                ("price", price.to_string()),
            ]),
        );
        Ok(response)
    }

    /// Accept one bid and reject all other pending bids in a single write.
    ///
    /// Two concurrent accepts on the same order cannot both succeed: the loser's
    /// compare-and-set fails, it re-reads, and finds its bid already rejected.
    pub fn accept_order_response(
        &self,
        ctx: &ActorContext,
        order_id: &OrderId,
        response_id: &OrderResponseId,
    ) -> Result<AcceptedBid, MarketError> {
        let (_, bid) = self.mutate(self.store().orders(), order_id, |order| {
            require_owner(ctx, &order.client_id, "accept responses on this order")?;
            order.accept_response(response_id)
        })?;

        info!(
            order_id = %order_id,
            response_id = %response_id,
            rejected = bid.rejected.len(),
            "order response accepted"
        );
        self.notify(
            "order.response_accepted",
            &bid.accepted.responder_id,
            details([
                ("order_id", order_id.to_string()),
                ("response_id", response_id.to_string()),
                ("price", bid.accepted.price.to_string()),
            ]),
        );
        Ok(bid)
    }

    pub fn reject_order_response(
        &self,
        ctx: &ActorContext,
        order_id: &OrderId,
        response_id: &OrderResponseId,
    ) -> Result<OrderResponse, MarketError> {
        let (_, response) = self.mutate(self.store().orders(), order_id, |order| {
            require_owner(ctx, &order.client_id, "reject responses on this order")?;
            order.reject_response(response_id)
        })?;
        info!(order_id = %order_id, response_id = %response_id, "order response rejected");
        Ok(response)
    }

    pub fn complete_order(&self, ctx: &ActorContext, id: &OrderId) -> Result<Order, MarketError> {
        let now = self.now();
        let (order, _) = self.mutate(self.store().orders(), id, |order| {
            require_owner(ctx, &order.client_id, "complete this order")?;
            order.complete(now)
        })?;

        info!(order_id = %id, "order completed");
        if let Some(accepted) = order.accepted_response() {
            self.notify(
                "order.completed",
                &accepted.responder_id,
                details([("order_id", id.to_string())]),
            );
        }
        Ok(order)
    }

    pub fn cancel_order(&self, ctx: &ActorContext, id: &OrderId) -> Result<Order, MarketError> {
        let now = self.now();
        let (order, rejected) = self.mutate(self.store().orders(), id, |order| {
            require_owner(ctx, &order.client_id, "cancel this order")?;
            order.cancel(now)
        })?;
        info!(order_id = %id, rejected = rejected.len(), "order cancelled");
        Ok(order)
    }
}
