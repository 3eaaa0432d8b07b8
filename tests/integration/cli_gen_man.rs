#[test]
fn cli_generates_man_page() {
  let mut cmd = test_support::cmd_bin(crate::fixtures::BIN);
  let out = cmd.args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8_lossy(&out.stdout);
  // clap_mangen emits a roff manpage starting with .TH and mentions the binary name
  assert!(s.contains(".TH"));
  assert!(s.contains("deploy-timeline"));
  // roff escapes hyphens in option names
  assert!(s.contains(r"\-\-start\-time"));
}
