/*!
# LanWake DevKit - Doubles et utilitaires de test

Bibliothèque facilitant les tests de l'agent sans broker ni réseau:
- Lien broker simulé (connexions scriptées, messages entrants simulés)
- Prober scripté et émetteur de magic packets enregistreur
- Harness assemblant un agent complet sur ces doubles
*/

pub mod fakes;
pub mod mqtt_stub;
pub mod test_utils;

pub use fakes::{RecordingWakeSender, ScriptedProber, StaticIdentity};
pub use mqtt_stub::{MockBrokerLink, MockMessage};
pub use test_utils::TestHarness;
