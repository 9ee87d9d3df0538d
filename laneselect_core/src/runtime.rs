//! Single-task driver feeding a subscription into a [`LaneSelectNode`].
//!
//! Messages are handled strictly one after another: a tick always runs to
//! its publish step before the next input is looked at.

use crate::messages::{InputMessage, OutputMessage};
use crate::node::{LaneSelectNode, TickOutcome};
use laneselect_env::{Publisher, Subscription};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Counters of tick outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    pub messages: u64,
    pub skipped: u64,
    pub localization_lost: u64,
    pub selected: u64,
    pub move_forward: u64,
    pub lane_change: u64,
    pub faulted: u64,
}

impl RuntimeStats {
    pub fn record(&mut self, outcome: TickOutcome) {
        self.messages += 1;
        match outcome {
            TickOutcome::Skipped => self.skipped += 1,
            TickOutcome::LocalizationLost => self.localization_lost += 1,
            TickOutcome::Selected(_) => self.selected += 1,
            TickOutcome::MoveForward => self.move_forward += 1,
            TickOutcome::LaneChange => self.lane_change += 1,
            TickOutcome::Faulted => self.faulted += 1,
        }
    }
}

/// Owns a node and the statistics of everything it processed.
pub struct LaneSelectRuntime<P>
where
    P: Publisher<OutputMessage>,
{
    node: LaneSelectNode<P>,
    stats: RuntimeStats,
}

impl<P> LaneSelectRuntime<P>
where
    P: Publisher<OutputMessage>,
{
    pub fn new(node: LaneSelectNode<P>) -> Self {
        Self {
            node,
            stats: RuntimeStats::default(),
        }
    }

    pub fn node(&self) -> &LaneSelectNode<P> {
        &self.node
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn into_node(self) -> LaneSelectNode<P> {
        self.node
    }

    /// Handles one message.
    pub fn step(&mut self, msg: InputMessage) -> TickOutcome {
        let outcome = self.node.handle(msg);
        self.stats.record(outcome);
        outcome
    }

    /// Handles everything already queued without waiting.
    ///
    /// Returns the number of messages handled.
    pub fn drain_pending<S>(&mut self, inputs: &S) -> usize
    where
        S: Subscription<InputMessage>,
    {
        let mut handled = 0;
        while let Some(msg) = inputs.try_recv() {
            self.step(msg);
            handled += 1;
        }
        handled
    }

    /// Processes inputs until every sender is gone.
    pub async fn run<S>(&mut self, inputs: &S) -> &RuntimeStats
    where
        S: Subscription<InputMessage>,
    {
        info!("Lane selector running");
        while let Some(msg) = inputs.recv().await {
            self.step(msg);
        }
        info!("Input closed after {} messages: {:?}", self.stats.messages, self.stats);
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LaneSelectConfig;
    use crate::geometry::pose_from_xy_yaw;
    use crate::lane::{Lane, LaneArray, Waypoint};
    use crate::messages::Twist;
    use laneselect_env::{channel, Header, RecordingPublisher};

    fn straight_lane(n: usize) -> Lane {
        let waypoints = (0..n)
            .map(|i| Waypoint::new(pose_from_xy_yaw(i as f64, 0.0, 0.0), 5.0))
            .collect();
        Lane::new(Header::default(), waypoints)
    }

    #[tokio::test]
    async fn test_run_until_closed() {
        let recorder = RecordingPublisher::new();
        let node = LaneSelectNode::new(LaneSelectConfig::default(), recorder.clone());
        let mut runtime = LaneSelectRuntime::new(node);

        let (tx, rx) = channel::<InputMessage>("lane_select_inputs");
        tx.send(InputMessage::LaneArray(LaneArray::new(vec![straight_lane(20)])))
            .unwrap();
        tx.send(InputMessage::Pose(pose_from_xy_yaw(0.0, 0.0, 0.0))).unwrap();
        tx.send(InputMessage::Velocity(Twist::forward(1.0))).unwrap();
        tx.send(InputMessage::Pose(pose_from_xy_yaw(1.0, 0.0, 0.0))).unwrap();
        tx.send(InputMessage::State("LANE_CHANGE".to_string())).unwrap();
        drop(tx);

        let stats = runtime.run(&rx).await.clone();
        assert_eq!(stats.messages, 5);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.selected, 1);
        assert_eq!(stats.move_forward, 1);
        assert_eq!(stats.lane_change, 1);

        assert!(recorder
            .snapshot()
            .contains(&OutputMessage::ClosestWaypoint(2)));
    }

    #[tokio::test]
    async fn test_drain_pending_does_not_wait() {
        let node = LaneSelectNode::new(LaneSelectConfig::default(), RecordingPublisher::new());
        let mut runtime = LaneSelectRuntime::new(node);

        let (tx, rx) = channel::<InputMessage>("lane_select_inputs");
        assert_eq!(runtime.drain_pending(&rx), 0);

        tx.send(InputMessage::Velocity(Twist::forward(0.0))).unwrap();
        assert_eq!(runtime.drain_pending(&rx), 1);
        assert_eq!(runtime.stats().skipped, 1);
    }
}
