//! Request correlation.
//!
//! Maps request ids to the pending callers awaiting their results. Ids are
//! handed out before the network write happens, so a caller can use its id
//! synchronously even though the outcome arrives later. Every pending entry
//! leaves the map exactly once, through [`RequestCorrelator::resolve`],
//! [`RequestCorrelator::expire`], or one of the cancel paths. The session's
//! exactly-once completion guarantee rests on that removal.

use std::{collections::HashMap, time::Duration};

use wavelink_proto::{ChannelRef, OpKind, RequestId, ServiceType};

use crate::TimePoint;

/// Who is waiting on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    /// An application caller; resolution produces a completion.
    Application,
    /// Reconnect restoration bookkeeping; resolution feeds the link state
    /// machine and the registry, never the application.
    Restoration,
}

/// One outstanding request.
#[derive(Debug, Clone)]
pub struct PendingRequest<I> {
    /// The id handed to the caller.
    pub request_id: RequestId,
    /// Operation the request carries.
    pub op: OpKind,
    /// Target channel, when the operation has one.
    pub channel: Option<ChannelRef>,
    /// Target topic, for topic operations.
    pub topic: Option<String>,
    /// Who is waiting on this request.
    pub origin: RequestOrigin,
    /// When the request was issued.
    pub issued_at: I,
    /// Deadline after which the request times out.
    pub deadline: Option<I>,
}

impl<I> PendingRequest<I> {
    /// Service whose link carries this request.
    pub fn service(&self) -> ServiceType {
        self.op.service()
    }
}

/// Assigns request ids and tracks outstanding requests for one session.
#[derive(Debug)]
pub struct RequestCorrelator<I> {
    next_id: RequestId,
    pending: HashMap<RequestId, PendingRequest<I>>,
}

impl<I: TimePoint> RequestCorrelator<I> {
    /// Empty correlator; the first issued id is `1`.
    pub fn new() -> Self {
        Self { next_id: 1, pending: HashMap::new() }
    }

    /// Allocate the next id and register a pending request.
    ///
    /// Ids are strictly increasing for the lifetime of the session and wrap
    /// only after exhausting the 64-bit space.
    pub fn issue(
        &mut self,
        now: I,
        op: OpKind,
        channel: Option<ChannelRef>,
        topic: Option<String>,
        origin: RequestOrigin,
        timeout: Option<Duration>,
    ) -> RequestId {
        let request_id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        if self.next_id == 0 {
            self.next_id = 1;
        }

        self.pending.insert(
            request_id,
            PendingRequest {
                request_id,
                op,
                channel,
                topic,
                origin,
                issued_at: now,
                deadline: timeout.map(|t| now + t),
            },
        );
        request_id
    }

    /// Take the pending request matching an inbound result.
    ///
    /// `None` means the result is a duplicate or a stale late-arrival; the
    /// caller logs and drops it. A request can be taken at most once, so a
    /// second result for the same id can never reach a caller twice.
    pub fn resolve(&mut self, request_id: RequestId) -> Option<PendingRequest<I>> {
        self.pending.remove(&request_id)
    }

    /// Drain every outstanding request, in id order.
    ///
    /// Used when the session terminates (logout, abort) so no caller waits
    /// forever.
    pub fn cancel_all(&mut self) -> Vec<PendingRequest<I>> {
        let mut drained: Vec<_> = self.pending.drain().map(|(_, req)| req).collect();
        drained.sort_by_key(|req| req.request_id);
        drained
    }

    /// Drain the outstanding requests carried by one service, in id order.
    ///
    /// Used when a single service link is permanently dropped while the other
    /// may still be connected.
    pub fn cancel_service(&mut self, service: ServiceType) -> Vec<PendingRequest<I>> {
        let ids: Vec<RequestId> = self
            .pending
            .values()
            .filter(|req| req.service() == service)
            .map(|req| req.request_id)
            .collect();

        let mut drained: Vec<_> =
            ids.into_iter().filter_map(|id| self.pending.remove(&id)).collect();
        drained.sort_by_key(|req| req.request_id);
        drained
    }

    /// Drain requests whose deadline has passed, in id order.
    ///
    /// Driven by the periodic tick, never by the issuing call.
    pub fn expire(&mut self, now: I) -> Vec<PendingRequest<I>> {
        let ids: Vec<RequestId> = self
            .pending
            .values()
            .filter(|req| req.deadline.is_some_and(|deadline| deadline <= now))
            .map(|req| req.request_id)
            .collect();

        let mut drained: Vec<_> =
            ids.into_iter().filter_map(|id| self.pending.remove(&id)).collect();
        drained.sort_by_key(|req| req.request_id);
        drained
    }

    /// Number of outstanding requests.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

impl<I: TimePoint> Default for RequestCorrelator<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn issue_simple(c: &mut RequestCorrelator<Instant>, now: Instant, op: OpKind) -> RequestId {
        c.issue(now, op, None, None, RequestOrigin::Application, None)
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let now = Instant::now();
        let mut c = RequestCorrelator::new();
        let mut last = 0;
        for _ in 0..100 {
            let id = issue_simple(&mut c, now, OpKind::Publish);
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn resolve_takes_the_entry_exactly_once() {
        let now = Instant::now();
        let mut c = RequestCorrelator::new();
        let id = issue_simple(&mut c, now, OpKind::Publish);

        assert!(c.resolve(id).is_some());
        assert!(c.resolve(id).is_none(), "second resolution must be a no-op");
        assert_eq!(c.outstanding(), 0);
    }

    #[test]
    fn stale_result_misses() {
        let mut c: RequestCorrelator<Instant> = RequestCorrelator::new();
        assert!(c.resolve(42).is_none());
    }

    #[test]
    fn expire_drains_only_past_deadlines() {
        let now = Instant::now();
        let mut c = RequestCorrelator::new();
        let fast = c.issue(
            now,
            OpKind::Publish,
            None,
            None,
            RequestOrigin::Application,
            Some(Duration::from_secs(5)),
        );
        let slow = c.issue(
            now,
            OpKind::Publish,
            None,
            None,
            RequestOrigin::Application,
            Some(Duration::from_secs(60)),
        );
        let _untimed = issue_simple(&mut c, now, OpKind::Login);

        let expired = c.expire(now + Duration::from_secs(10));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].request_id, fast);
        assert_eq!(c.outstanding(), 2);

        let expired = c.expire(now + Duration::from_secs(100));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].request_id, slow);
    }

    #[test]
    fn cancel_all_drains_in_id_order() {
        let now = Instant::now();
        let mut c = RequestCorrelator::new();
        let ids: Vec<_> = (0..10).map(|_| issue_simple(&mut c, now, OpKind::Publish)).collect();

        let drained = c.cancel_all();
        let drained_ids: Vec<_> = drained.iter().map(|r| r.request_id).collect();
        assert_eq!(drained_ids, ids);
        assert_eq!(c.outstanding(), 0);
    }

    #[test]
    fn cancel_service_leaves_the_other_service_pending() {
        let now = Instant::now();
        let mut c = RequestCorrelator::new();
        let publish = issue_simple(&mut c, now, OpKind::Publish);
        let join = issue_simple(&mut c, now, OpKind::Join);

        let drained = c.cancel_service(ServiceType::Stream);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].request_id, join);
        assert!(c.resolve(publish).is_some());
    }
}
