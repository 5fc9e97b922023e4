/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    task::spawn,
    time::interval,
};

#[derive(Debug)]
enum RngProviderOps {
    GetStream(oneshot::Sender<Xoshiro256PlusPlus>),
    SetCryptoRng(ChaCha20Rng),
}

/// Owns the crypto-seeded master generator. Every evaluation gets its own
/// independently seeded Xoshiro stream, which is what makes multi-roll
/// rerolls statistically independent of each other.
struct RngProvider {
    rng: ChaCha20Rng,
    receiver: mpsc::Receiver<RngProviderOps>,
}

impl RngProvider {
    async fn run(&mut self) {
        while let Some(op) = self.receiver.recv().await {
            match op {
                RngProviderOps::GetStream(channel) => {
                    let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
                    self.rng.fill(&mut seed);
                    let _ = channel.send(Xoshiro256PlusPlus::from_seed(seed));
                }
                RngProviderOps::SetCryptoRng(rng) => self.rng = rng,
            }
        }
    }
}

#[derive(Clone)]
pub struct RngHandle {
    sender: mpsc::Sender<RngProviderOps>,
}

impl RngHandle {
    /// Spawn the provider task, reseeding the master generator from entropy
    /// every `reseed` interval.
    pub fn spawn(reseed: Duration) -> RngHandle {
        let (sender, receiver) = mpsc::channel(32);
        spawn(async move {
            RngProvider {
                rng: ChaCha20Rng::from_entropy(),
                receiver,
            }
            .run()
            .await
        });
        let sender_clone = sender.clone();
        spawn(async move {
            let mut timer = interval(reseed);
            timer.tick().await;
            loop {
                timer.tick().await;
                if sender_clone
                    .send(RngProviderOps::SetCryptoRng(ChaCha20Rng::from_entropy()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });
        RngHandle { sender }
    }

    /// A fresh, independently seeded stream for one evaluation.
    pub async fn stream(&self) -> Xoshiro256PlusPlus {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(RngProviderOps::GetStream(sender))
            .await
            .expect("rng provider task stopped");
        receiver.await.expect("rng provider task stopped")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::RngCore;

    #[tokio::test]
    async fn test_streams_are_independent() {
        let handle = RngHandle::spawn(Duration::from_secs(300));
        let mut a = handle.stream().await;
        let mut b = handle.stream().await;
        let first: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let second: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(first, second);
    }
}
