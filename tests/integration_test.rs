// End-to-end runs of the didata binary against a mocked CloudControl API.

use assert_cmd::cargo::cargo_bin_cmd;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const ORG: &str = "8cdfd607-f429-4df6-9352-162cfc0891be";

struct Harness {
    server: MockServer,
    home: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            server: MockServer::start(),
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, rest: &str) -> String {
        format!("/caas/2.4/{ORG}/{rest}")
    }

    fn legacy_path(&self, rest: &str) -> String {
        format!("/oec/0.9/{ORG}/{rest}")
    }

    fn cmd(&self) -> assert_cmd::Command {
        let base_url = self.server.base_url();
        let mut cmd = cargo_bin_cmd!("didata");
        cmd.current_dir(self.home.path())
            .env("DIDATA_CONFIG_DIR", self.home.path().join("config"))
            .env("NO_COLOR", "1")
            .env_remove("DIDATA_USER")
            .env_remove("DIDATA_PASSWORD")
            .env_remove("DIDATA_REGION")
            .env_remove("DIDATA_ENDPOINT")
            .env_remove("DIDATA_ORG_ID")
            .env_remove("RUST_LOG")
            .args([
                "--endpoint",
                base_url.as_str(),
                "--user",
                "fakeuser",
                "--password",
                "fakepass",
                "--org-id",
                ORG,
            ]);
        cmd
    }
}

#[test]
fn help_lists_resource_groups() {
    let mut cmd = cargo_bin_cmd!("didata");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("server"))
        .stdout(predicate::str::contains("network"))
        .stdout(predicate::str::contains("tag"));
}

#[test]
fn power_commands_offer_filter_flags() {
    for sub in ["start", "shutdown", "shutdown-hard", "reboot", "reboot-hard", "destroy"] {
        let mut cmd = cargo_bin_cmd!("didata");
        cmd.args(["server", sub, "--help"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("--server-id"))
            .stdout(predicate::str::contains("--server-filter-ipv6"));
    }
}

#[test]
fn missing_credentials_exit_with_config_code() {
    let h = Harness::new();
    let mut cmd = cargo_bin_cmd!("didata");
    cmd.current_dir(h.home.path())
        .env("DIDATA_CONFIG_DIR", h.home.path().join("config"))
        .env_remove("DIDATA_USER")
        .env_remove("DIDATA_PASSWORD")
        .args(["location", "list"]);
    cmd.assert()
        .code(6)
        .stderr(predicate::str::contains("user and password are required"));
}

#[test]
fn server_list_prints_summary() {
    let h = Harness::new();
    let mock = h.server.mock(|when, then| {
        when.method(GET)
            .path(h.path("server/server"))
            .query_param("datacenterId", "NA9");
        then.status(200).json_body(json!({
            "server": [{
                "id": "b7a9e7c6-0d2b-4b0e-9a5c-3b9d0f3c2a11",
                "name": "web01",
                "datacenterId": "NA9",
                "operatingSystem": {"id": "UBUNTU1464", "displayName": "UBUNTU14/64"},
                "networkInfo": {"primaryNic": {"privateIpv4": "10.0.0.5", "ipv6": "2607:f480::5"}}
            }],
            "pageNumber": 1, "pageCount": 1, "totalCount": 1, "pageSize": 250
        }));
    });

    h.cmd()
        .args(["server", "list", "--datacenter-id", "NA9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web01"))
        .stdout(predicate::str::contains("ID: b7a9e7c6-0d2b-4b0e-9a5c-3b9d0f3c2a11"))
        .stdout(predicate::str::contains("OS: UBUNTU14/64"))
        .stdout(predicate::str::contains("Private IPv4: 10.0.0.5"));
    mock.assert();
}

#[test]
fn server_list_dumpall_flattens() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("server/server"));
        then.status(200).json_body(json!({
            "server": [{
                "id": "A",
                "name": "web01",
                "disk": [{"id": "d0", "sizeGb": 10}, {"id": "d1", "sizeGb": 50}],
                "cpu": {"count": 2, "speed": "STANDARD"}
            }]
        }));
    });

    h.cmd()
        .args(["server", "list", "--dumpall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cpu.count: 2"))
        .stdout(predicate::str::contains("disk.sizeGb: 50"))
        .stdout(predicate::str::contains("disk.sizeGb: 10").not());

    h.cmd()
        .args(["--indexed-keys", "server", "list", "--dumpall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disk.0.sizeGb: 10"))
        .stdout(predicate::str::contains("disk.1.sizeGb: 50"));
}

#[test]
fn start_by_filter_posts_resolved_id() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET)
            .path(h.path("server/server"))
            .query_param("ipv6", "2607:f480::5");
        then.status(200)
            .json_body(json!({"server": [{"id": "B", "name": "db01"}]}));
    });
    let start = h.server.mock(|when, then| {
        when.method(POST)
            .path(h.path("server/startServer"))
            .json_body(json!({"id": "B"}));
        then.status(200).json_body(json!({
            "operation": "START_SERVER",
            "responseCode": "IN_PROGRESS",
            "message": "Request to start Server 'db01' has been accepted and is being processed.",
            "requestId": "na9/1"
        }));
    });

    h.cmd()
        .args(["server", "start", "--server-filter-ipv6", "2607:f480::5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Request to start Server 'db01' has been accepted"))
        .stdout(predicate::str::contains("responseCode: IN_PROGRESS"));
    start.assert();
}

#[test]
fn ambiguous_filter_lists_candidates() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("server/server"));
        then.status(200).json_body(json!({
            "server": [{"id": "A"}, {"id": "C"}]
        }));
    });
    let reboot = h.server.mock(|when, then| {
        when.method(POST).path(h.path("server/rebootServer"));
        then.status(200).json_body(json!({}));
    });

    h.cmd()
        .args(["server", "reboot", "--server-filter-name", "web"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("FAILURE: multiple resources found"))
        .stderr(predicate::str::contains("A\nC\n"))
        .stdout(predicate::str::is_empty());
    reboot.assert_hits(0);
}

#[test]
fn no_match_and_no_filter_exit_codes() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("server/server"));
        then.status(200).json_body(json!({"server": []}));
    });

    h.cmd()
        .args(["server", "destroy", "--server-filter-private-ipv4", "10.9.9.9"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("no resources found"));

    h.cmd()
        .args(["server", "destroy"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no filter was provided"));
}

#[test]
fn api_error_reports_message_and_code() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("network/vlan"));
        then.status(400).json_body(json!({
            "operation": "LIST_VLANS",
            "responseCode": "REASON_541",
            "message": "Unable to list vlans"
        }));
    });

    h.cmd()
        .args(["network", "list-vlans"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FAILURE: Unable to list vlans"))
        .stderr(predicate::str::contains("Response code: REASON_541 (HTTP 400)"));
}

#[test]
fn create_vlan_sends_payload() {
    let h = Harness::new();
    let mock = h.server.mock(|when, then| {
        when.method(POST)
            .path(h.path("network/deployVlan"))
            .json_body(json!({
                "networkDomainId": "423c4386-87b4-43c4-9604-88ae237bfc7f",
                "name": "overlap_vlan",
                "privateIpv4BaseAddress": "10.192.238.0",
                "privateIpv4PrefixSize": 24
            }));
        then.status(200).json_body(json!({
            "operation": "DEPLOY_VLAN",
            "responseCode": "IN_PROGRESS",
            "message": "Request to deploy VLAN 'overlap_vlan' has been accepted.",
            "info": [{"name": "vlanId", "value": "eee454f4-562a-4b23-ad57-4cb8b034c8c9"}]
        }));
    });

    h.cmd()
        .args([
            "network",
            "create-vlan",
            "--network-domain-id",
            "423c4386-87b4-43c4-9604-88ae237bfc7f",
            "--name",
            "overlap_vlan",
            "--base-ipv4-address",
            "10.192.238.0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("vlanId: eee454f4-562a-4b23-ad57-4cb8b034c8c9"));
    mock.assert();
}

#[test]
fn tag_list_keys_and_empty_listing() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("tag/tagKey"));
        then.status(200).json_body(json!({
            "tagKey": [{"id": "k1", "name": "env", "valueRequired": true}],
            "totalCount": 1
        }));
    });
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("tag/tag"));
        then.status(200).json_body(json!({"tag": [], "totalCount": 0}));
    });

    h.cmd()
        .args(["tag", "list-keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env"))
        .stdout(predicate::str::contains("Value Required: true"));

    h.cmd()
        .args(["tag", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources found."));
}

#[test]
fn json_output_passes_response_through() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.path("infrastructure/datacenter"));
        then.status(200)
            .json_body(json!({"datacenter": [{"id": "NA9", "displayName": "US - East 3"}]}));
    });

    h.cmd()
        .args(["-o", "json", "location", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"displayName\": \"US - East 3\""));
}

#[test]
fn configure_then_show_masks_password() {
    let h = Harness::new();
    h.cmd()
        .args(["configure", "--scope", "local"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".didata.yaml"));

    let mut show = cargo_bin_cmd!("didata");
    show.current_dir(h.home.path())
        .env("DIDATA_CONFIG_DIR", h.home.path().join("config"))
        .env_remove("DIDATA_USER")
        .env_remove("DIDATA_PASSWORD")
        .env_remove("DIDATA_ORG_ID")
        .env_remove("DIDATA_ENDPOINT")
        .arg("config-show");
    show.assert()
        .success()
        .stdout(predicate::str::contains("\"user\": \"fakeuser\""))
        .stdout(predicate::str::contains("*****"))
        .stdout(predicate::str::contains("fakepass").not());
}

#[test]
fn server_list_sends_every_filter() {
    let h = Harness::new();
    let mock = h.server.mock(|when, then| {
        when.method(GET)
            .path(h.path("server/server"))
            .query_param("id", "A")
            .query_param("networkId", "net-1")
            .query_param("createTime", "2015-05-01T12:00:00.000Z")
            .query_param("operatingSystemId", "UBUNTU1464");
        then.status(200).json_body(json!({"server": [{"id": "A", "name": "web01"}]}));
    });

    h.cmd()
        .args([
            "server",
            "list",
            "--id",
            "A",
            "--network-id",
            "net-1",
            "--create-time",
            "2015-05-01T12:00:00.000Z",
            "--operating-system-id",
            "UBUNTU1464",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("web01"));
    mock.assert();
}

#[test]
fn create_firewall_rule_sends_payload() {
    let h = Harness::new();
    let mock = h.server.mock(|when, then| {
        when.method(POST)
            .path(h.path("network/createFirewallRule"))
            .json_body(json!({
                "networkDomainId": "fake_network_domain",
                "name": "my_fake_rule",
                "action": "DROP",
                "ipVersion": "IPV4",
                "protocol": "TCP",
                "source": {"ip": {"address": "ANY"}},
                "destination": {"ip": {"address": "10.1.1.15"}},
                "enabled": true,
                "placement": {"position": "LAST"}
            }));
        then.status(200).json_body(json!({
            "operation": "CREATE_FIREWALL_RULE",
            "responseCode": "OK",
            "message": "Firewall rule 'my_fake_rule' has been created.",
            "info": [{"name": "firewallRuleId", "value": "d0a20f59"}]
        }));
    });

    h.cmd()
        .args([
            "network",
            "create-firewall-rule",
            "--name",
            "my_fake_rule",
            "--network-domain-id",
            "fake_network_domain",
            "--ip-version",
            "ipv4",
            "--action",
            "drop",
            "--protocol",
            "tcp",
            "--source-ip",
            "ANY",
            "--source-start-port",
            "ANY",
            "--destination-ip",
            "10.1.1.15",
            "--destination-start-port",
            "ANY",
            "--position",
            "last",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Firewall rule 'my_fake_rule' has been created."))
        .stdout(predicate::str::contains("firewallRuleId: d0a20f59"));
    mock.assert();
}

#[test]
fn classic_networks_list_and_delete() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.legacy_path("networkWithLocation/NA1"));
        then.status(200).body(
            r#"<ns4:NetworkWithLocations xmlns:ns4="http://oec.api.opsource.net/schemas/network">
<ns4:network><ns4:id>n1</ns4:id><ns4:name>test-net</ns4:name><ns4:description/>
<ns4:location>NA1</ns4:location><ns4:privateNet>10.162.1.0</ns4:privateNet><ns4:multicast>false</ns4:multicast></ns4:network>
</ns4:NetworkWithLocations>"#,
        );
    });
    let delete = h.server.mock(|when, then| {
        when.method(GET)
            .path(h.legacy_path("network/n1"))
            .query_param_exists("delete");
        then.status(200).body(
            "<Status><operation>Delete Network</operation><result>SUCCESS</result>\
             <resultDetail>Network n1 deleted</resultDetail><resultCode>REASON_0</resultCode></Status>",
        );
    });

    h.cmd()
        .args(["network", "list-networks", "--datacenter-id", "NA1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test-net"))
        .stdout(predicate::str::contains("PrivateNet: 10.162.1.0"));

    h.cmd()
        .args(["network", "delete-network", "--network-id", "n1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Network n1 deleted"))
        .stdout(predicate::str::contains("Status.resultCode: REASON_0"));
    delete.assert();
}

#[test]
fn backup_enable_posts_service_plan() {
    let h = Harness::new();
    let mock = h.server.mock(|when, then| {
        when.method(POST)
            .path(h.legacy_path("server/abc/backup"))
            .body_contains(r#"servicePlan="Advanced""#);
        then.status(200).body(
            r#"<ns6:Status xmlns:ns6="http://oec.api.opsource.net/schemas/general">
<ns6:operation>Enable Backup for Server</ns6:operation><ns6:result>SUCCESS</ns6:result>
<ns6:resultDetail>Backup enabled for Server - Job Id: 0a1b</ns6:resultDetail>
<ns6:resultCode>REASON_0</ns6:resultCode></ns6:Status>"#,
        );
    });

    h.cmd()
        .args(["backup", "enable", "--server-id", "abc", "--service-plan", "advanced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup enabled for Server - Job Id: 0a1b"))
        .stdout(predicate::str::contains("Status.operation: Enable Backup for Server"));
    mock.assert();
}

#[test]
fn backup_list_client_types() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.legacy_path("server/abc/backup/client/type"));
        then.status(200).body(
            r#"<ns4:BackupClientTypes xmlns:ns4="http://oec.api.opsource.net/schemas/backup">
<ns4:backupClientType type="FA.Linux" isFileSystem="true" description="Linux File system"/>
<ns4:backupClientType type="MySQL" isFileSystem="false" description="MySQL Database"/>
</ns4:BackupClientTypes>"#,
        );
    });

    h.cmd()
        .args(["backup", "list-client-types", "--server-id", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FA.Linux"))
        .stdout(predicate::str::contains("Description: MySQL Database"));
}

#[test]
fn backup_download_url_resolves_server_by_ipv6() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET)
            .path(h.path("server/server"))
            .query_param("ipv6", "2607:f480::5");
        then.status(200)
            .json_body(json!({"server": [{"id": "B", "name": "db01"}]}));
    });
    h.server.mock(|when, then| {
        when.method(GET).path(h.legacy_path("server/B/backup"));
        then.status(200).body(
            r#"<ns4:BackupDetails xmlns:ns4="http://oec.api.opsource.net/schemas/backup" assetId="B" servicePlan="Enterprise" state="NORMAL">
<ns4:backupClient id="c1" type="FA.Linux" isFileSystem="true" status="Unregistered">
<ns4:downloadUrl>https://backup.example.com/c1</ns4:downloadUrl>
</ns4:backupClient></ns4:BackupDetails>"#,
        );
    });

    h.cmd()
        .args(["backup", "download-url", "--server-filter-ipv6", "2607:f480::5"])
        .assert()
        .success()
        .stdout("https://backup.example.com/c1\n");
}

#[test]
fn backup_download_url_without_clients_fails() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.legacy_path("server/abc/backup"));
        then.status(200)
            .body(r#"<BackupDetails assetId="abc" servicePlan="Essentials" state="NORMAL"/>"#);
    });

    h.cmd()
        .args(["backup", "download-url", "--server-id", "abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no backup clients are configured"));

    h.cmd()
        .args(["backup", "download-url"])
        .assert()
        .code(3);
}

#[test]
fn legacy_xml_error_reports_result_detail() {
    let h = Harness::new();
    h.server.mock(|when, then| {
        when.method(GET).path(h.legacy_path("server/abc/backup"));
        then.status(400).body(
            r#"<ns2:Status xmlns:ns2="http://oec.api.opsource.net/schemas/general">
<ns2:operation>Get Backup Details</ns2:operation><ns2:result>ERROR</ns2:result>
<ns2:resultDetail>Server abc is not enabled for backup</ns2:resultDetail>
<ns2:resultCode>REASON_543</ns2:resultCode></ns2:Status>"#,
        );
    });

    h.cmd()
        .args(["backup", "info", "--server-id", "abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "FAILURE: Server abc is not enabled for backup",
        ))
        .stderr(predicate::str::contains("Response code: REASON_543 (HTTP 400)"));
}
